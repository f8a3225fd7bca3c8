//! Centralized engine limits and configuration constants.
//!
//! All magic numbers that bound parser, compiler and matcher work are
//! collected here so they can be tuned in one place. `Options` picks its
//! defaults from these.

// ===== Parser =====

/// Default maximum nesting depth of groups and repetitions.
/// Exceeding it is `ParseErrorKind::TooComplex`.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 1000;

/// Largest count accepted in a `{m,n}` repetition (RE2's kMaxRepeat).
pub const MAX_REPEAT: u32 = 1000;

/// Maximum number of capturing groups in one pattern.
pub const MAX_GROUPS: usize = 0xFFFF;

/// Maximum length of a group name.
pub const MAX_GROUP_NAME_LEN: usize = 128;

// ===== Compiler =====

/// Default maximum number of instructions in a compiled program.
/// Exceeding it is `CompileErrorKind::ProgramTooLarge`.
pub const DEFAULT_MAX_PROGRAM_SIZE: usize = 500_000;

// ===== Unicode =====

/// Largest Unicode scalar value.
pub const MAX_UNICODE: u32 = 0x10FFFF;

/// Largest Latin-1 unit.
pub const MAX_LATIN1: u32 = 0xFF;

/// Unit value produced for a byte that is not part of valid UTF-8.
/// It lies outside every class, so invalid input never matches.
pub const INVALID_UNIT: u32 = u32::MAX;
