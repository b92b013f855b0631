//! Seam dilation
//!
//! Bilinear filtering reads texels just outside a chart. One dilation pass
//! fills every black texel that touches a lit one so those reads don't
//! bleed black into the chart edge.

use rayon::prelude::*;

use crate::bake::rasterizer::BakeContext;

impl BakeContext {
    /// Fill each all-zero texel with the rounded average of its non-zero
    /// 4-neighbors. Reads a snapshot, so texels filled by this pass don't
    /// feed each other. Returns the number of texels filled.
    pub fn image_dilate(&mut self) -> usize {
        let width = self.width as usize;
        let height = self.height as usize;
        let source = self.lightmap.clone();

        let filled: usize = self
            .lightmap
            .par_chunks_mut(width)
            .enumerate()
            .map(|(y, row)| {
                let fetch = |x: usize, y: usize| -> Option<[u8; 3]> {
                    let color = source[y * width + x];
                    (color != [0, 0, 0]).then_some(color)
                };

                let mut filled = 0;
                for (x, texel) in row.iter_mut().enumerate() {
                    if *texel != [0, 0, 0] {
                        continue;
                    }

                    let neighbors = [
                        (x > 0).then(|| fetch(x - 1, y)).flatten(),
                        (x + 1 < width).then(|| fetch(x + 1, y)).flatten(),
                        (y > 0).then(|| fetch(x, y - 1)).flatten(),
                        (y + 1 < height).then(|| fetch(x, y + 1)).flatten(),
                    ];

                    let mut sum = [0u32; 3];
                    let mut count = 0u32;
                    for color in neighbors.into_iter().flatten() {
                        for c in 0..3 {
                            sum[c] += u32::from(color[c]);
                        }
                        count += 1;
                    }

                    if count > 0 {
                        *texel = sum.map(|s| ((s + count / 2) / count) as u8);
                        filled += 1;
                    }
                }
                filled
            })
            .sum();

        log::info!("Dilation filled {} texels", filled);
        filled
    }
}
