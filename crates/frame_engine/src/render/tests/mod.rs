//! Frame loop integration tests
