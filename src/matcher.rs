use facematch_engine::{compare_with, find_best_match_with, Embedding};
use log::{debug, info, warn};

use crate::config::Config;
use crate::protocol::{Request, Response};

/// Parse a raw request and run it. Always yields a response.
pub fn process(raw: &[u8], cfg: &Config) -> Response {
    match Request::parse(raw) {
        Ok(request) => handle(request, cfg),
        Err(e) => {
            warn!("Rejecting request: {}", e);
            Response::error(e)
        }
    }
}

pub fn handle(request: Request, cfg: &Config) -> Response {
    let threshold = request.threshold().unwrap_or(cfg.threshold);
    let mut options = cfg.compare_options();
    if let Some(l2_normalize) = request.l2_normalize() {
        options.l2_normalize = l2_normalize;
    }

    match request {
        Request::Compare {
            input_embedding,
            stored_embedding,
            ..
        } => {
            debug!("Comparing two embeddings (threshold: {:.3})", threshold);
            let scored = Embedding::from_f64(&input_embedding).and_then(|input| {
                let stored = Embedding::from_f64(&stored_embedding)?;
                compare_with(&input, &stored, threshold, options)
            });
            match scored {
                Ok(result) => {
                    info!(
                        "Similarity {:.3} (threshold: {:.3}, match: {})",
                        result.similarity, threshold, result.is_match
                    );
                    Response::comparison(&result)
                }
                Err(e) => {
                    warn!("Comparison failed: {}", e);
                    Response::error(e)
                }
            }
        }
        Request::Search {
            input_embedding,
            stored_faces,
            ..
        } => {
            let input = match Embedding::from_f64(&input_embedding) {
                Ok(input) => input,
                Err(e) => {
                    warn!("Search rejected: {}", e);
                    return Response::error(e);
                }
            };

            debug!(
                "Searching {} stored face(s) (threshold: {:.3})",
                stored_faces.len(),
                threshold
            );
            let report = find_best_match_with(&input, &stored_faces, threshold, options);
            if !report.skipped.is_empty() {
                warn!("Skipped {} stored face(s)", report.skipped.len());
            }
            info!(
                "Best score: {:.3} (threshold: {:.3}, found: {})",
                report.outcome.highest_similarity(),
                threshold,
                report.outcome.is_found()
            );
            Response::search(report)
        }
    }
}
