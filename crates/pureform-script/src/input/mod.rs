//! Input readers - parse source code into IR.

pub mod javascript;

pub use javascript::{
    FunctionShape, JAVASCRIPT_READER, JavascriptReader, function_shape, read_function,
    read_javascript,
};
