pub mod adapter;

pub use adapter::SliceAdapter;
