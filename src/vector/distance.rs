//! Cosine distance helpers shared by the graph and the store.
//!
//! The graph keeps unit-length copies of every vector, so distances inside
//! the graph reduce to `1 - dot(a, b)`. A zero vector stays zero after
//! normalization and sits at distance 1.0 from everything.

/// Computes cosine similarity between two vectors.
///
/// # Returns
/// * Cosine similarity in range [-1, 1], where 1 is most similar. Zero
///   vectors have similarity 0 with everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product = dot(a, b);
    let norm_a = norm(a);
    let norm_b = norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Cosine distance, `1 - cosine_similarity(a, b)`, in range [0, 2].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Cosine distance between two vectors that are already unit length (or zero).
#[inline]
pub fn normalized_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - dot(a, b)
}

/// Returns a unit-length copy of `vector`. Zero vectors are returned unchanged.
pub fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = norm(vector);
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|x| x / norm).collect()
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
