mod articles;
mod feeds;
mod schema;
mod state;
mod types;

pub use schema::Database;
pub use types::{
    Article, Author, Category, DatabaseError, Feed, Image, NormalizedArticle,
};
