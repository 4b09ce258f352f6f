//! Target reference derivation.

/// Derives the push target of `source` inside `repository/namespace`.
///
/// Only the text after the last `/` of the source is kept, so
/// `docker.io/library/nginx:1.25` becomes `repository/namespace/nginx:1.25`.
/// Two sources sharing that final segment map to the same target.
#[must_use]
pub fn target_image(source: &str, repository: &str, namespace: &str) -> String {
    let name = source.rsplit('/').next().unwrap_or(source);
    format!("{repository}/{namespace}/{name}")
}

#[cfg(test)]
mod tests {
    use super::target_image;
    use rstest::rstest;

    #[rstest]
    #[case("docker.io/lib/nginx", "r/n/nginx")]
    #[case("nginx:1.25", "r/n/nginx:1.25")]
    #[case("registry.k8s.io/kube-apiserver:v1.29.0", "r/n/kube-apiserver:v1.29.0")]
    fn keeps_only_the_last_path_segment(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(target_image(source, "r", "n"), expected);
    }

    #[rstest]
    fn sources_sharing_a_final_segment_collide() {
        assert_eq!(
            target_image("quay.io/a/app:1", "r", "n"),
            target_image("ghcr.io/b/app:1", "r", "n")
        );
    }
}
