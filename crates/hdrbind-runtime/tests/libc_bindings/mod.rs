pub mod api;
pub mod funcs;
