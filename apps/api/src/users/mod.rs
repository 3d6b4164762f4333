// Mirrors identity-provider users into the `users` collection.

pub mod handlers;
pub mod profile;
