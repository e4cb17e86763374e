//! Bucket policy granting anonymous reads on the public prefixes.

use serde_json::{json, Value};

use crate::keys::public_prefixes;

/// S3 bucket policy allowing `s3:GetObject` on `public/*` and `{preview_folder}/*`.
pub fn public_read_policy(bucket: &str, preview_folder: &str) -> Value {
    let resources: Vec<String> = public_prefixes(preview_folder)
        .iter()
        .map(|prefix| format!("arn:aws:s3:::{}/{}*", bucket, prefix))
        .collect();

    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": { "AWS": ["*"] },
                "Action": ["s3:GetObject"],
                "Resource": resources,
            }
        ]
    })
}

/// Serialized form of [`public_read_policy`], as sent to `PutBucketPolicy`.
pub fn public_read_policy_document(bucket: &str, preview_folder: &str) -> String {
    public_read_policy(bucket, preview_folder).to_string()
}
