//! Label derivation vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use gqlprom_core::labels::{custom_labels, request_labels, LabelSource};


#[test]
fn label_vectors() {
    let files = [
        "labels_request_full.json",
        "labels_anonymous.json",
        "labels_context_scalars.json",
        "labels_no_context.json",
    ];

    for f in files {
        let v = vector_loader::load(f);

        let ctx = v.context.as_ref().map(|c| c as &dyn LabelSource);
        let labels = custom_labels(ctx, &v.custom_labels).merge(&request_labels(
            v.operation_name.as_deref(),
            v.operation.as_deref(),
        ));

        let got: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let want: Vec<(String, String)> = v.expect.into_iter().collect();
        assert_eq!(got, want, "vector={}", v.description);
    }
}
