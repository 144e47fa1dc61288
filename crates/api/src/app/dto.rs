//! Response envelopes.
//!
//! Requests decode straight into [`blogapi_core::NewPost`].

use serde::Serialize;

use blogapi_core::Post;

/// `GET /posts`
#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

/// `GET /posts/{id}`
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: Post,
}

/// `POST /posts` and `PUT /posts/{id}`
#[derive(Debug, Serialize)]
pub struct PostWrittenResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub post: Post,
}

impl PostWrittenResponse {
    pub fn created(post: Post) -> Self {
        Self {
            message: "post created",
            status: "success",
            post,
        }
    }

    pub fn updated(post: Post) -> Self {
        Self {
            message: "post updated",
            status: "success",
            post,
        }
    }
}
