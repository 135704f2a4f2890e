// Library root
// -----------
// The binary (`main.rs`) wires these modules into a one-shot smoke test
// of the report-upload service.
//
// Module responsibilities:
// - `api`: HTTP calls to the service and the shapes of its responses.
// - `fixture`: the temporary CSV file used by the upload check.
// - `probe`: runs the checks in order and records their outcomes.
// - `ui`: renders status lines, optionally colored, plus the spinner.
// - `cli`: command-line flags and their defaults.
pub mod api;
pub mod cli;
pub mod fixture;
pub mod probe;
pub mod ui;
