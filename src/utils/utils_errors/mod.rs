use std::fmt;

/// A common error type returned by the recoverable (input-facing) functions of the crate.
///
/// Errors that indicate a caller bug (an out-of-range trajectory index coming from a precomputed
/// map, mismatched buffer sizes, using a manager before initialization) are not represented here;
/// those are asserted on directly.
#[derive(Clone, Debug, PartialEq)]
pub enum CioError {
    GenericError(String),
    IdxOutOfBoundError(String),
    UnsupportedOperationError(String),
    ParseError(String)
}
impl CioError {
    pub fn new_generic_error_str(s: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: {} -- File: {}, Line: {}", s, file, line);
        return Self::GenericError(s);
    }
    pub fn new_idx_out_of_bound_error(given_idx: usize, length_of_array: usize, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Index {:?} is too large for the array of length {:?} -- File: {}, Line: {}", given_idx, length_of_array, file, line);
        return Self::IdxOutOfBoundError(s);
    }
    pub fn new_check_for_idx_out_of_bound_error(given_idx: usize, length_of_array: usize, file: &str, line: u32) -> Result<(), Self> {
        return if given_idx < length_of_array {
            Ok(())
        } else {
            Err(Self::new_idx_out_of_bound_error(given_idx, length_of_array, file, line))
        }
    }
    pub fn new_unsupported_operation_error(function_name: &str, message: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Unsupported operation error in function {}.  {} -- File: {}, Line: {}", function_name, message, file, line);
        return Self::UnsupportedOperationError(s);
    }
    pub fn new_parse_error(format_name: &str, message: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Could not parse {} input.  {} -- File: {}, Line: {}", format_name, message, file, line);
        return Self::ParseError(s);
    }
    pub fn message(&self) -> &str {
        return match self {
            CioError::GenericError(s) => { s }
            CioError::IdxOutOfBoundError(s) => { s }
            CioError::UnsupportedOperationError(s) => { s }
            CioError::ParseError(s) => { s }
        }
    }
}
impl fmt::Display for CioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
impl std::error::Error for CioError { }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idx_check_passes_inside_bounds() {
        assert!(CioError::new_check_for_idx_out_of_bound_error(2, 3, file!(), line!()).is_ok());
    }

    #[test]
    fn idx_check_reports_length() {
        let err = CioError::new_check_for_idx_out_of_bound_error(3, 3, file!(), line!()).expect_err("index 3 is out of bounds");
        assert!(matches!(err, CioError::IdxOutOfBoundError(_)));
        assert!(err.to_string().contains("array of length 3"));
    }
}
