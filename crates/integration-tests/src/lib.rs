//! Black-box tests for the HTTP surface live under `tests/`.
