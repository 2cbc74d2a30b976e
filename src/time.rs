/// This library uses a simple discrete time model.
pub type Time = u64;

/// Syntactic sugar to give a hint that a time value indicates a
/// point in time or some offset.
pub type Instant = Time;

/// Syntactic sugar to give a hint that a time value denotes an
/// interval length.
pub type Duration = Time;

/// Exact integer ceiling division. All bound arithmetic is carried
/// out on integers; floating-point rounding is never involved.
pub fn divide_with_ceil(a: Time, b: Time) -> Time {
    a / b + (a % b > 0) as Time
}
