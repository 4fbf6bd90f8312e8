//! Shared harness for router tests: in-memory collaborators behind the real
//! router, plus request builders.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tenderbox_api::{build_router, AppState, Collaborators, RouterOptions, UploadLimits};
use tenderbox_core::mock::{
    MemoryAuditLog, MemoryBlobStore, MemoryFileIndex, MemoryProposalStore, StaticActorResolver,
};
use tenderbox_core::{Actor, Proposal, ProposalStatus, Role};

pub const BOUNDARY: &str = "tenderbox-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub index: Arc<MemoryFileIndex>,
    pub blobs: Arc<MemoryBlobStore>,
    pub proposals: Arc<MemoryProposalStore>,
    pub log: Arc<MemoryAuditLog>,
}

pub fn limits() -> UploadLimits {
    UploadLimits {
        max_file_bytes: 1024,
        max_files: 3,
    }
}

/// Real router over fakes. Proposals: p1 (u1, draft), p2 (u2, won).
pub fn app() -> TestApp {
    app_with_options(RouterOptions::default())
}

pub fn app_with_options(options: RouterOptions) -> TestApp {
    let log = Arc::new(MemoryAuditLog::new());
    let index = Arc::new(MemoryFileIndex::new().with_audit_log(log.clone()));
    let blobs = Arc::new(MemoryBlobStore::new());

    let proposals = Arc::new(MemoryProposalStore::new());
    proposals.insert(Proposal {
        id: "p1".to_string(),
        created_by_uid: "u1".to_string(),
        status: ProposalStatus::Draft,
    });
    proposals.insert(Proposal {
        id: "p2".to_string(),
        created_by_uid: "u2".to_string(),
        status: ProposalStatus::Won,
    });

    let actors = StaticActorResolver::new()
        .with_token("bdm-token", Actor::new("u1", Role::Bdm, "Bea"))
        .with_token("bdm2-token", Actor::new("u2", Role::Bdm, "Bo"))
        .with_token("est-token", Actor::new("e1", Role::Estimator, "Eve"))
        .with_token("coo-token", Actor::new("c1", Role::Coo, "Cy"))
        .with_token("dir-token", Actor::new("d1", Role::Director, "Dee"));

    let state = AppState::new(
        Collaborators {
            files: index.clone(),
            blobs: blobs.clone(),
            proposals: proposals.clone(),
            audit: log.clone(),
            actors: Arc::new(actors),
        },
        limits(),
    );

    TestApp {
        router: build_router(state, options),
        index,
        blobs,
        proposals,
        log,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::delete(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(token: &str, body: serde_json::Value) -> Request<Body> {
    Request::post("/api/files")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// One multipart part.
pub enum Part<'a> {
    File {
        name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        field: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", field, value)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn post_multipart(token: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::post("/api/files")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
