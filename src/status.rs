//! The HTTP status codes tsubin answers with.
//!
//! ```rust
//! use tsubin::{Response, Status};
//!
//! Response::status(Status::NotFound);
//! Response::builder().status(Status::Found).header("location", "/new/").no_body();
//! ```

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,                   // 200
    Found,                // 302
    BadRequest,           // 400
    NotFound,             // 404
    MethodNotAllowed,     // 405
    InternalServerError,  // 500
    ServiceUnavailable,   // 503
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::Found               => 302,
            Status::BadRequest          => 400,
            Status::NotFound            => 404,
            Status::MethodNotAllowed    => 405,
            Status::InternalServerError => 500,
            Status::ServiceUnavailable  => 503,
        }
    }
}
