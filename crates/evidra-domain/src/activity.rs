//! Report → OCSF activity projection.

use evidra_types::ids::{
    OCSF_SCHEMA_VERSION, PRODUCT_NAME, STATUS_FAILURE, STATUS_FAILURE_ID, STATUS_SUCCESS,
    STATUS_SUCCESS_ID, VENDOR_NAME,
};
use evidra_types::{
    Activity, ActivityBase, ActivityKind, ActivityMetadata, ApiActivity, Product, Report,
    ResourceDetails, ScanActivity, ScanDetails,
};

const CATEGORY_APPLICATION_ACTIVITY: (i32, &str) = (6, "Application Activity");
const CLASS_API_ACTIVITY: (i32, &str) = (6003, "API Activity");
const CLASS_SCAN_ACTIVITY: (i32, &str) = (6007, "Scan Activity");
const ACTIVITY_UNKNOWN: (i32, &str) = (0, "Unknown");
const ACTIVITY_COMPLETED: (i32, &str) = (2, "Completed");
const SEVERITY_UNKNOWN: (i32, &str) = (0, "Unknown");

const SCAN_TYPE_OTHER: i32 = 99;
const SCAN_TYPE_NAME: &str = "Policy Evaluation";

/// ("success", 1) when the report succeeded, ("failure", 2) otherwise.
pub fn report_status(report: &Report) -> (&'static str, i32) {
    if report.success {
        (STATUS_SUCCESS, STATUS_SUCCESS_ID)
    } else {
        (STATUS_FAILURE, STATUS_FAILURE_ID)
    }
}

pub fn report_to_activity(report: &Report, kind: ActivityKind) -> Activity {
    match kind {
        ActivityKind::Api => Activity::Api(ApiActivity {
            base: base(report, CLASS_API_ACTIVITY, ACTIVITY_UNKNOWN),
        }),
        ActivityKind::Scan => Activity::Scan(ScanActivity {
            base: base(report, CLASS_SCAN_ACTIVITY, ACTIVITY_COMPLETED),
            scan: ScanDetails {
                uid: report.policy.name.clone(),
                name: report.policy.name.clone(),
                type_id: SCAN_TYPE_OTHER,
                kind: SCAN_TYPE_NAME.to_string(),
            },
            num_files: u32::try_from(report.filepaths.len()).unwrap_or(u32::MAX),
        }),
    }
}

fn base(report: &Report, class: (i32, &str), activity: (i32, &str)) -> ActivityBase {
    let (class_uid, class_name) = class;
    let (activity_id, activity_name) = activity;
    let (status, status_id) = report_status(report);

    ActivityBase {
        activity_id,
        activity_name: activity_name.to_string(),
        category_uid: CATEGORY_APPLICATION_ACTIVITY.0,
        category_name: CATEGORY_APPLICATION_ACTIVITY.1.to_string(),
        class_uid,
        class_name: class_name.to_string(),
        type_uid: i64::from(class_uid) * 100 + i64::from(activity_id),
        type_name: format!("{class_name}: {activity_name}"),
        status: status.to_string(),
        status_id,
        severity: SEVERITY_UNKNOWN.1.to_string(),
        severity_id: SEVERITY_UNKNOWN.0,
        metadata: ActivityMetadata {
            product: Product {
                name: PRODUCT_NAME.to_string(),
                vendor_name: VENDOR_NAME.to_string(),
                version: (!report.ec_version.is_empty()).then(|| report.ec_version.clone()),
            },
            version: OCSF_SCHEMA_VERSION.to_string(),
        },
        resources: report
            .filepaths
            .iter()
            .map(|input| ResourceDetails {
                name: input.filepath.clone(),
            })
            .collect(),
        time: effective_time_millis(report),
    }
}

fn effective_time_millis(report: &Report) -> i64 {
    let nanos = report.effective_time.unix_timestamp_nanos() / 1_000_000;
    i64::try_from(nanos).unwrap_or(i64::MAX)
}
