//! Test modules for the content cache
