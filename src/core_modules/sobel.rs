// THEORY:
// The `sobel` module detects edges by approximating the intensity gradient of
// a grayscale view of the image with the two fixed 3x3 Sobel kernels, one per
// perpendicular direction. The per-pixel edge response is the sum of the
// absolute values of both convolutions, thresholded into a binary map.
//
// Key architectural principles:
// 1.  **Pure Per-Pixel Work**: every interior pixel is computed from its 3x3
//     neighborhood alone. Re-invoking with a new threshold is cheap and has
//     no hidden state, which is what interactive threshold tuning relies on.
// 2.  **Untouched Border**: the outermost 1-pixel frame is never convolved
//     and stays at the buffer's default 0 (black). This mirrors the original
//     detector's boundary handling and is kept as-is rather than replaced
//     with clamping or mirroring.

/// Kernel for the horizontal gradient (responds to vertical edges).
pub const KERNEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
/// Kernel for the vertical gradient (responds to horizontal edges).
pub const KERNEL_Y: [[i32; 3]; 3] = [[1, 2, 1], [0, 0, 0], [-1, -2, -1]];

/// Largest possible `|gx| + |gy|` response on 8-bit input.
pub const MAX_EDGE_RESPONSE: i32 = 1020;

/// Thresholds the Sobel edge response of a grayscale buffer into a binary
/// map: 255 where `|gx| + |gy| >= threshold`, 0 elsewhere. `levels` is
/// row-major with `width * height` entries.
pub fn detect_edges(levels: &[u8], width: u32, height: u32, threshold: i32) -> Vec<u8> {
    let width = width as usize;
    let height = height as usize;
    let mut output = vec![0u8; width * height];

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut gx = 0i32;
            let mut gy = 0i32;

            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let neighbor_x = (x as i32 + dx) as usize;
                    let neighbor_y = (y as i32 + dy) as usize;
                    let level = levels[neighbor_y * width + neighbor_x] as i32;

                    gx += level * KERNEL_X[(dy + 1) as usize][(dx + 1) as usize];
                    gy += level * KERNEL_Y[(dy + 1) as usize][(dx + 1) as usize];
                }
            }

            let response = gx.abs() + gy.abs();
            output[y * width + x] = if response >= threshold { 255 } else { 0 };
        }
    }

    output
}
