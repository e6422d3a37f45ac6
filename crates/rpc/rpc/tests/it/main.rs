#![allow(missing_docs)]

mod call;
mod contract;
mod nonce;
mod pubsub;
mod utils;

const fn main() {}
