use bentley::*;

#[test]
fn test_basic_logging_functions() {
  info("Test info message");
  warn("Test warning message");
  error("Test error message");
  success("Test success message");
  verbose("Test verbose message");
}

#[test]
fn test_multiline_messages() {
  let multiline_msg = "First line\nSecond line\nThird line";
  info(multiline_msg);
  warn(multiline_msg);
  error(multiline_msg);
}

#[test]
fn test_macros_accept_format_arguments() {
  let chunks = 12;
  bentley::info!("indexed {chunks} chunks");
  bentley::warn!("{} pages were empty", 2);
  bentley::success!("done");
  bentley::announce!("Docent");
}
