//! # EcoScan Web
//!
//! HTTP front end for the screening pipeline. A browser uploads a CSV
//! batch and gets back every row annotated with its status and map
//! coordinates.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the server
//! cargo run -p ecoscan-web -- --port 8000
//!
//! # Analyze a batch
//! curl -F file=@edna_data.csv http://127.0.0.1:8000/analyze
//! ```
//!
//! ## API Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Liveness message |
//! | GET | `/health` | Status and version |
//! | POST | `/analyze` | Multipart upload (field `file`, `.csv`) |

pub mod routes;
pub mod settings;
pub mod state;

pub use routes::create_router;
pub use settings::load_settings;
pub use state::AppState;
