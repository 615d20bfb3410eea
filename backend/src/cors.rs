use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Request, Response};
use rocket::http::Header;

use crate::actions::ACTION_VERSION;
use crate::config::Cluster;

/// Headers every actions client expects, on every response.
pub struct CORS {
    blockchain_id: &'static str,
}

impl CORS {
    pub fn new(cluster: Cluster) -> Self {
        Self { blockchain_id: cluster.blockchain_id() }
    }
}

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Actions CORS",
            kind: Kind::Response
        }
    }

    async fn on_response<'r>(&self, _req: &'r Request<'_>, res: &mut Response<'r>) {
        res.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        res.set_header(Header::new("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS"));
        res.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type, Authorization, Content-Encoding, Accept-Encoding"));
        res.set_header(Header::new("Access-Control-Expose-Headers", "X-Action-Version, X-Blockchain-Ids"));
        res.set_header(Header::new("X-Blockchain-Ids", self.blockchain_id));
        res.set_header(Header::new("X-Action-Version", ACTION_VERSION));
    }
}
