use std::path::PathBuf;
use tempfile::TempDir;

/// Write a small but representative table snapshot and return its path.
/// Three text-ish columns, one currency, one email; two views (the second
/// pins and reorders); four rows with mixed cell metadata.
pub fn sample_table(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("accounts.table.json");
    let json = r#"{
        "table_name": "Accounts",
        "columns": [
            {"field_id": "name", "field_name": "Company", "field_type": "text", "width": 20},
            {"field_id": "domain", "field_name": "Domain", "field_type": "url", "width": 18},
            {"field_id": "arr", "field_name": "ARR", "field_type": "currency", "width": 12},
            {"field_id": "email", "field_name": "Contact Email", "field_type": "email", "width": 24},
            {"field_id": "notes", "field_name": "Notes", "field_type": "paragraph", "width": 30}
        ],
        "views": [
            {"view_id": "v-general", "view_name": "All accounts", "view_type": "general"},
            {"view_id": "v-outreach", "view_name": "Outreach", "view_type": "configured",
             "field_props": [
                {"field_id": "name", "pin": true, "visible": true, "sort": 0},
                {"field_id": "email", "pin": false, "visible": true, "sort": 1},
                {"field_id": "arr", "pin": false, "visible": true, "width": 10, "sort": 2},
                {"field_id": "domain", "pin": false, "visible": false, "sort": 3},
                {"field_id": "ghost", "pin": false, "visible": true, "sort": 4}
             ]}
        ],
        "active_view_id": "v-general",
        "rows": [
            {"row_id": "r1", "cells": {
                "name": {"value": "Acme"},
                "domain": {"value": "https://acme.io"},
                "arr": {"value": 125000},
                "email": {"value": "kai@acme.io", "confidence": "high", "validation": "verified"},
                "notes": {"value": "Spoke at the expo.\nFollow up in Q3."}
            }},
            {"row_id": "r2", "cells": {
                "name": {"value": "Globex"},
                "domain": {"value": "globex"},
                "arr": {"value": "pending"},
                "email": {"value": "info-at-globex", "confidence": "low", "validation": "potential-issue"}
            }},
            {"row_id": "r3", "cells": {
                "name": {"value": "Initech", "image_preview": "https://initech.example/logo.png"},
                "email": {"value": "m.bolton@initech.example", "validation": "not-validated"}
            }},
            {"row_id": "r4", "cells": {}}
        ]
    }"#;
    std::fs::write(&path, json).unwrap();
    path
}
