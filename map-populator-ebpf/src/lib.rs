#![no_std]

// This file exists to enable the library target so the userspace crate can
// list this package as a build dependency.
