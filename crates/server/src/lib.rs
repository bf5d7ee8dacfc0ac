//! Resume Server - HTTP endpoint rendering resumes and CVs to PDF
//!
//! `POST /api/pdf` takes `{ type, template, data, name }` as JSON; `GET
//! /api/pdf` takes the same request as a base64 `payload` parameter or as
//! individual `type`/`template`/`name`/`data.<key>` parameters. Responses
//! are inline PDFs, or a JSON body with a machine-readable `error` code.

pub mod config;
pub mod convert;
pub mod error;
pub mod request;
pub mod response;
pub mod routes;

pub use config::Config;
pub use convert::{ChromiumConverter, ConvertError, HtmlToPdf};
pub use error::ApiError;
pub use request::RenderRequest;
pub use routes::{render, router, AppState};
