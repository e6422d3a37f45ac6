#![allow(missing_docs)]

mod http;
mod startup;
pub mod utils;

const fn main() {}
