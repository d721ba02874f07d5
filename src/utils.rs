use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessBody {
    pub ok: bool,
}

impl SuccessBody {
    pub fn ok() -> SuccessBody {
        SuccessBody { ok: true }
    }
}
