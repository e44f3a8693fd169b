//! 2D simplex noise over a seeded permutation table (after Stefan
//! Gustavson's public-domain reference).

const GRAD2: [[f64; 2]; 8] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

/// Skew factor `(sqrt(3) - 1) / 2`.
const F2: f64 = 0.366_025_403_784_438_6;
/// Unskew factor `(3 - sqrt(3)) / 6`.
const G2: f64 = 0.211_324_865_405_187_1;

/// Doubled 256-entry permutation, shuffled from a seed.
pub(super) struct Permutation {
    table: [u8; 512],
}

impl Permutation {
    /// Fisher–Yates shuffle of `0..=255` driven by the Park–Miller style LCG
    /// `s = (s * 16807 + 1) mod 2^31`.
    pub(super) fn seeded(seed: u32) -> Self {
        let mut p = [0u8; 256];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut s = u64::from(seed);
        for i in (1..256usize).rev() {
            s = (s * 16_807 + 1) & 0x7fff_ffff;
            let j = (s % (i as u64 + 1)) as usize;
            p.swap(i, j);
        }

        let mut table = [0u8; 512];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = p[i & 255];
        }
        Self { table }
    }

    fn at(&self, index: usize) -> usize {
        self.table[index] as usize
    }

    fn gradient_dot(&self, hash: usize, x: f64, y: f64) -> f64 {
        let g = GRAD2[hash % 8];
        g[0] * x + g[1] * y
    }

    /// Simplex noise at `(x, y)`, roughly in `[-1, 1]`.
    pub(super) fn simplex2d(&self, x: f64, y: f64) -> f64 {
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + G2;
        let y1 = y0 - f64::from(j1) + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let (i1, j1) = (i1 as usize, j1 as usize);

        let corner = |dx: f64, dy: f64, hash: usize| {
            let t = 0.5 - dx * dx - dy * dy;
            if t < 0.0 {
                0.0
            } else {
                let t2 = t * t;
                t2 * t2 * self.gradient_dot(hash, dx, dy)
            }
        };

        let n0 = corner(x0, y0, self.at(ii + self.at(jj)));
        let n1 = corner(x1, y1, self.at(ii + i1 + self.at(jj + j1)));
        let n2 = corner(x2, y2, self.at(ii + 1 + self.at(jj + 1)));

        70.0 * (n0 + n1 + n2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_is_a_bijection() {
        let perm = Permutation::seeded(1234);
        let mut seen = [false; 256];
        for i in 0..256 {
            seen[perm.at(i)] = true;
        }
        assert!(seen.iter().all(|&s| s));
        for i in 0..256 {
            assert_eq!(perm.at(i), perm.at(i + 256));
        }
    }

    #[test]
    fn simplex_is_zero_at_lattice_origin() {
        let perm = Permutation::seeded(0);
        assert_eq!(perm.simplex2d(0.0, 0.0), 0.0);
    }

    #[test]
    fn simplex_stays_roughly_in_unit_range() {
        let perm = Permutation::seeded(99);
        for yi in 0..64 {
            for xi in 0..64 {
                let v = perm.simplex2d(f64::from(xi) * 0.173, f64::from(yi) * 0.219);
                assert!(v.abs() <= 1.0 + 1e-9, "out of range: {v}");
            }
        }
    }
}
