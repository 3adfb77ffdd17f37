mod harness;

mod health;
