mod classify;
mod document;
mod extract;
mod run;
mod texture;
mod variants;
mod walk;

#[cfg(test)]
mod tests;

pub use run::run;
