pub mod encoding;
pub mod filter;
pub mod report;
pub mod stats;
pub mod sweep;
pub mod topo;
pub mod trace;

#[cfg(test)]
mod test;
