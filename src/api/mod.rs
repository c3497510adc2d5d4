pub mod account;
pub mod confirm;
pub mod leave;
pub mod profile;
#[cfg(test)]
mod tests;
