use anyhow::Result;
use facematch::{config::Config, matcher};
use serde_json::{json, Value};

/// Run a raw request the way the binary does and read back the JSON it prints
fn respond(raw: &str) -> Result<Value> {
    respond_bytes(raw.as_bytes())
}

fn respond_bytes(raw: &[u8]) -> Result<Value> {
    let response = matcher::process(raw, &Config::default());
    let text = serde_json::to_string(&response)?;
    println!("{} -> {}", String::from_utf8_lossy(raw), text);
    Ok(serde_json::from_str(&text)?)
}

#[test]
fn test_compare_identical() -> Result<()> {
    env_logger::try_init().ok();
    let out = respond(r#"{"input_embedding":[1,0],"stored_embedding":[1,0],"threshold":0.6}"#)?;
    assert_eq!(
        out,
        json!({
            "success": true,
            "similarity": 1.0,
            "is_match": true,
            "distance": 0.0,
            "euclidean_similarity": 1.0,
            "threshold": 0.6
        })
    );
    Ok(())
}

#[test]
fn test_compare_orthogonal_uses_default_threshold() -> Result<()> {
    let out = respond(r#"{"input_embedding":[1,0],"stored_embedding":[0,1]}"#)?;
    assert_eq!(out["success"], json!(true));
    assert_eq!(out["similarity"], json!(0.0));
    assert_eq!(out["is_match"], json!(false));
    assert_eq!(out["threshold"], json!(0.6));
    Ok(())
}

#[test]
fn test_compare_dimension_mismatch() -> Result<()> {
    let out = respond(r#"{"input_embedding":[1,0,0],"stored_embedding":[1,0]}"#)?;
    assert_eq!(out["success"], json!(false));
    assert_eq!(
        out["error"],
        json!("Embedding dimension mismatch: expected 3, got 2")
    );
    assert!(out.get("similarity").is_none());
    Ok(())
}

#[test]
fn test_invalid_json_and_shape() -> Result<()> {
    let out = respond("not json at all")?;
    assert_eq!(out["success"], json!(false));
    assert!(out["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid JSON input:"));

    let out = respond(r#"{"stored_faces":[]}"#)?;
    assert_eq!(out["success"], json!(false));
    assert!(out["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid input format."));
    Ok(())
}

#[test]
fn test_search_finds_best_employee() -> Result<()> {
    let request = json!({
        "input_embedding": [0.0, 1.0, 0.0],
        "stored_faces": [
            {
                "face_descriptor": "[0.2, 0.8, 0.1]",
                "employee_id": 11,
                "full_name": "Dewi Lestari",
                "position": "Engineer"
            },
            {
                "face_descriptor": "[0.0, 1.0, 0.05]",
                "employee_id": 12,
                "full_name": "Eko Prasetyo",
                "position": "Manager",
                "department": "Finance",
                "employee_code": "EMP-012"
            },
            {
                "face_descriptor": "[1.0, 0.0, 0.0]",
                "employee_id": 13,
                "full_name": "Fajar Nugroho"
            }
        ]
    });
    let out = respond(&request.to_string())?;

    assert_eq!(out["success"], json!(true));
    let matched = &out["match"];
    assert_eq!(matched["employee_id"], json!(12));
    assert_eq!(matched["employee_name"], json!("Eko Prasetyo"));
    assert_eq!(matched["position"], json!("Manager"));
    assert_eq!(matched["department"], json!("Finance"));
    assert_eq!(matched["employee_code"], json!("EMP-012"));
    assert!(matched["similarity"].as_f64().unwrap_or_default() > 0.99);
    assert!(out.get("skipped").is_none());
    Ok(())
}

#[test]
fn test_search_missing_optional_fields_render_empty() -> Result<()> {
    let request = json!({
        "input_embedding": [0.6, 0.8],
        "stored_faces": [
            { "face_descriptor": "[0.6, 0.8]", "employee_id": "E-7", "full_name": "Gita" }
        ]
    });
    let out = respond(&request.to_string())?;
    let matched = &out["match"];
    assert_eq!(matched["employee_id"], json!("E-7"));
    assert_eq!(matched["position"], json!(""));
    assert_eq!(matched["department"], json!(""));
    assert_eq!(matched["employee_code"], json!(""));
    assert_eq!(matched["similarity"], json!(1.0));
    assert_eq!(matched["distance"], json!(0.0));
    Ok(())
}

#[test]
fn test_search_skips_malformed_faces() -> Result<()> {
    env_logger::try_init().ok();
    let request = json!({
        "input_embedding": [1.0, 0.0],
        "stored_faces": [
            { "face_descriptor": "[1.0, 0.0", "employee_id": 1, "full_name": "Broken" },
            { "face_descriptor": "[0.9, 0.1]", "employee_id": 2 },
            { "face_descriptor": "[0.95, 0.05]", "employee_id": 3, "full_name": "Hana" },
            "not even an object"
        ]
    });
    let out = respond(&request.to_string())?;

    assert_eq!(out["success"], json!(true));
    assert_eq!(out["match"]["employee_id"], json!(3));

    let skipped: Vec<u64> = out["skipped"]
        .as_array()
        .map(|s| s.iter().filter_map(|e| e["index"].as_u64()).collect())
        .unwrap_or_default();
    assert_eq!(skipped, vec![0, 1, 3]);
    Ok(())
}

#[test]
fn test_search_no_match_reports_highest_similarity() -> Result<()> {
    let request = json!({
        "input_embedding": [1.0, 0.0],
        "stored_faces": [
            { "face_descriptor": "[0.0, 1.0]", "employee_id": 1, "full_name": "Indra" },
            { "face_descriptor": "[0.5, 0.5]", "employee_id": 2, "full_name": "Joko" }
        ],
        "threshold": 0.9
    });
    let out = respond(&request.to_string())?;
    assert_eq!(out["success"], json!(false));
    assert_eq!(out["message"], json!("No matching face found"));
    let highest = out["highest_similarity"].as_f64().unwrap_or_default();
    assert!((highest - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_search_empty_set() -> Result<()> {
    let out = respond(r#"{"input_embedding":[1,0],"stored_faces":[]}"#)?;
    assert_eq!(
        out,
        json!({
            "success": false,
            "message": "No matching face found",
            "highest_similarity": 0.0
        })
    );
    Ok(())
}

#[test]
fn test_legacy_field_names() -> Result<()> {
    let request = json!({
        "input_descriptor": [0.3, 0.4],
        "stored_faces": [
            { "face_descriptor": "[0.3, 0.4]", "employee_id": 5, "employee_name": "Kartika" }
        ]
    });
    let out = respond(&request.to_string())?;
    assert_eq!(out["success"], json!(true));
    assert_eq!(out["match"]["employee_name"], json!("Kartika"));
    Ok(())
}

#[test]
fn test_invalid_utf8_still_gets_a_response() -> Result<()> {
    let raw = b"{\"input_embedding\":[1,0],\"stored_embedding\":[1,0],\"x\":\"\xff\"}";
    let out = respond_bytes(raw)?;
    assert_eq!(out["success"], json!(false));
    assert!(out["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid JSON input:"));
    Ok(())
}

#[test]
fn test_face_with_both_name_fields() -> Result<()> {
    let request = json!({
        "input_embedding": [1.0, 0.0],
        "stored_faces": [
            {
                "face_descriptor": "[1, 0]",
                "employee_id": 1,
                "full_name": "Lina Marlina",
                "employee_name": "Lina"
            }
        ]
    });
    let out = respond(&request.to_string())?;
    assert_eq!(out["success"], json!(true));
    assert_eq!(out["match"]["employee_name"], json!("Lina Marlina"));
    assert!(out.get("skipped").is_none());
    Ok(())
}

#[test]
fn test_search_with_l2_normalize() -> Result<()> {
    let request = json!({
        "input_embedding": [2.0, 0.0, 0.0],
        "stored_faces": [
            { "face_descriptor": "[0.0, 5.0, 0.0]", "employee_id": 1, "full_name": "Maya" },
            { "face_descriptor": "[7.0, 0.0, 0.0]", "employee_id": 2, "full_name": "Nanda" }
        ],
        "l2_normalize": true
    });
    let out = respond(&request.to_string())?;
    assert_eq!(out["success"], json!(true));
    assert_eq!(out["match"]["employee_id"], json!(2));
    assert_eq!(out["match"]["distance"], json!(0.0));
    Ok(())
}
