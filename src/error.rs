/// A specialized [`Result`] type for simfs simulations.
///
/// This type is generally useful for fallible test cases and actors, i.e.
/// where you want to use the `?` operator to fail the simulation rather than
/// writing unwrap everywhere. File system errors ([`FsError`]) convert into
/// it.
///
/// [`Result`]: std::result::Result
/// [`FsError`]: crate::fs::FsError
pub type Result<T = ()> = std::result::Result<T, Box<dyn std::error::Error>>;
