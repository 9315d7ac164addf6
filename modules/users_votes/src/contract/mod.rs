pub mod model;

pub use model::{NewUser, NewVote, User, UserPatch, Vote};
