//! # P-code
//!
//! A 16-bit stack machine as it was in the era of p-System Pascal.
//!
//! This crate is the runtime half of a Pascal toolchain. The compiler,
//! optimizer, and linker live elsewhere and hand us two opaque blobs:
//! an instruction stream and a read-only data image. Everything the
//! running program touches lives in one flat byte buffer addressed by
//! 16-bit offsets: a string stack, the read-only data, the ordinary
//! stack, and a chunked heap.
//!
//! There are no globals anywhere. Each [`mach::Machine`] owns its
//! memory, registers, and file table, so independent machines can run
//! on separate threads.

pub mod mach;
