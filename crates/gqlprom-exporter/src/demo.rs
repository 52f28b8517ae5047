//! Small schema served by the demo binary and used by integration tests.

use async_graphql::{EmptySubscription, Object, Schema, SimpleObject, ID};

use gqlprom_core::LabelSource;

use crate::extension::PrometheusExtension;

pub type DemoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(Debug, Clone, SimpleObject)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Post {
    pub id: ID,
    pub title: String,
    pub author: Author,
}

fn sample_posts() -> Vec<Post> {
    vec![
        Post {
            id: ID::from("1"),
            title: "Hello".into(),
            author: Author { name: "ada".into() },
        },
        Post {
            id: ID::from("2"),
            title: "Again".into(),
            author: Author { name: "grace".into() },
        },
    ]
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn hello(&self, name: Option<String>) -> String {
        format!("hello {}", name.as_deref().unwrap_or("world"))
    }

    async fn posts(&self) -> Vec<Post> {
        sample_posts()
    }

    /// Always fails; handy for exercising the failure metrics.
    async fn broken(&self) -> async_graphql::Result<String> {
        Err("resolver failed".into())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_post(&self, title: String) -> Post {
        Post {
            id: ID::from("3"),
            title,
            author: Author { name: "anon".into() },
        }
    }
}

pub fn build_schema<C: LabelSource + Clone + 'static>(extension: PrometheusExtension<C>) -> DemoSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .extension(extension)
        .finish()
}
