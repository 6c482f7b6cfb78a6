// SIMD kernels for the dot products behind cosine scoring and MMR redundancy.
// Runtime feature detection picks AVX2/FMA or NEON; everything else takes the
// unrolled scalar path. A given machine always takes the same path, so scores
// are reproducible per host.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

// Below this size the setup cost outweighs the vector lanes
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
const MIN_DIM_SIMD: usize = 16;

/// Dot product of two equal-length slices; mismatched lengths give 0.0
#[inline]
pub fn dot_product_simd(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIMD
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            return unsafe { dot_product_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if a.len() >= MIN_DIM_SIMD && std::arch::is_aarch64_feature_detected!("neon") {
            return unsafe { dot_product_neon(a, b) };
        }
    }

    dot_product_scalar(a, b)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
unsafe fn dot_product_avx2(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let pa = a.as_ptr();
    let pb = b.as_ptr();

    let mut acc_lo = _mm256_setzero_ps();
    let mut acc_hi = _mm256_setzero_ps();
    let mut i = 0;
    while i + 16 <= len {
        acc_lo = _mm256_fmadd_ps(_mm256_loadu_ps(pa.add(i)), _mm256_loadu_ps(pb.add(i)), acc_lo);
        acc_hi = _mm256_fmadd_ps(
            _mm256_loadu_ps(pa.add(i + 8)),
            _mm256_loadu_ps(pb.add(i + 8)),
            acc_hi,
        );
        i += 16;
    }

    let acc = _mm256_add_ps(acc_lo, acc_hi);
    let folded = _mm_add_ps(_mm256_extractf128_ps(acc, 1), _mm256_castps256_ps128(acc));
    let pairs = _mm_hadd_ps(folded, folded);
    let mut total = _mm_cvtss_f32(_mm_hadd_ps(pairs, pairs));

    for j in i..len {
        total += a[j] * b[j];
    }
    total
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
#[inline]
unsafe fn dot_product_neon(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let pa = a.as_ptr();
    let pb = b.as_ptr();

    let mut acc_lo = vdupq_n_f32(0.0);
    let mut acc_hi = vdupq_n_f32(0.0);
    let mut i = 0;
    while i + 8 <= len {
        acc_lo = vfmaq_f32(acc_lo, vld1q_f32(pa.add(i)), vld1q_f32(pb.add(i)));
        acc_hi = vfmaq_f32(acc_hi, vld1q_f32(pa.add(i + 4)), vld1q_f32(pb.add(i + 4)));
        i += 8;
    }

    let mut total = vaddvq_f32(vaddq_f32(acc_lo, acc_hi));
    for j in i..len {
        total += a[j] * b[j];
    }
    total
}

/// Four independent accumulators so the adds pipeline
#[inline]
fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; 4];
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let a_rest = a_chunks.remainder();
    let b_rest = b_chunks.remainder();

    for (x, y) in a_chunks.zip(b_chunks) {
        acc[0] += x[0] * y[0];
        acc[1] += x[1] * y[1];
        acc[2] += x[2] * y[2];
        acc[3] += x[3] * y[3];
    }

    let tail: f32 = a_rest.iter().zip(b_rest).map(|(x, y)| x * y).sum();
    (acc[0] + acc[1]) + (acc[2] + acc[3]) + tail
}

#[inline]
pub fn norm_squared_simd(v: &[f32]) -> f32 {
    dot_product_simd(v, v)
}

#[inline]
pub fn norm_simd(v: &[f32]) -> f32 {
    norm_squared_simd(v).sqrt()
}
