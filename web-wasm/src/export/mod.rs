pub mod js_bindings;
