//! Built-in echo service wired by the binary.
//!
//! Its controller authorizes the public `echo` operation and answers 200 with
//! the assembled query data, so both transports can be exercised end to end.

use serde_json::Value;

use crate::pipeline::{controller, Operation, Phases};

pub const OPERATION: &str = "echo";

pub fn phases() -> Phases {
    Phases::new(
        |request, response, _config| {
            let query = Value::Object(request.query_params().clone());
            Ok(controller(move |gate| {
                gate.authorize(&Operation::public(OPERATION))?;
                Ok(response.with_status(200, "").with_data(query))
            }))
        },
        |response, _config| Ok(response),
    )
}
