mod common;

mod assessment;
mod school;
