pub mod columns;
pub mod scope;
pub mod values;
pub mod window;
