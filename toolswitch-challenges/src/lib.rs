pub mod tool_switching;
