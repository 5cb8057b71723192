//! SQLSTATE code classification shared by the SQL drivers.

/// Returns `true` if `code` belongs to an error class that means the
/// connection or the server is unusable:
///
/// * `08` connection exception
/// * `3D` invalid catalog name (the database does not exist)
/// * `53` insufficient resources
/// * `57` operator intervention (shutdown, admin termination)
/// * `58` system error external to the server
/// * `XX` internal error
pub fn is_connection_failure_code(code: &str) -> bool {
    matches!(code.get(..2), Some("08" | "3D" | "53" | "57" | "58" | "XX"))
}
