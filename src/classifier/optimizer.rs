use ndarray::{Array, ArrayD, Dimension, Zip};
use std::collections::HashMap;

/// Adam (adaptive moment estimation). Moments are tracked per named
/// parameter; the time step is shared and advanced once per batch.
pub struct AdamOptimizer {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    first_moments: HashMap<String, ArrayD<f32>>,
    second_moments: HashMap<String, ArrayD<f32>>,
    t: i32,
}

impl AdamOptimizer {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            first_moments: HashMap::new(),
            second_moments: HashMap::new(),
            t: 0,
        }
    }

    pub fn begin_step(&mut self) {
        self.t += 1;
    }

    pub fn step<D: Dimension>(
        &mut self,
        param_name: &str,
        param: &mut Array<f32, D>,
        gradient: &Array<f32, D>,
    ) {
        let (beta1, beta2) = (self.beta1, self.beta2);
        let t = self.t.max(1);
        let gradient = gradient.view().into_dyn();

        let m = self
            .first_moments
            .entry(param_name.to_string())
            .or_insert_with(|| ArrayD::zeros(gradient.raw_dim()));
        m.zip_mut_with(&gradient, |m, g| *m = beta1 * *m + (1.0 - beta1) * g);

        let v = self
            .second_moments
            .entry(param_name.to_string())
            .or_insert_with(|| ArrayD::zeros(gradient.raw_dim()));
        v.zip_mut_with(&gradient, |v, g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let first_correction = 1.0 - beta1.powi(t);
        let second_correction = 1.0 - beta2.powi(t);
        let (learning_rate, epsilon) = (self.learning_rate, self.epsilon);

        Zip::from(param.view_mut().into_dyn())
            .and(&*m)
            .and(&*v)
            .for_each(|p, &m, &v| {
                let m_hat = m / first_correction;
                let v_hat = v / second_correction;
                *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_first_step_moves_by_learning_rate_against_gradient() {
        let mut optimizer = AdamOptimizer::new(0.1);
        let mut param = array![1.0f32, -1.0, 0.5];
        let gradient = array![2.0f32, -3.0, 0.0];

        optimizer.begin_step();
        optimizer.step("w", &mut param, &gradient);

        // Bias-corrected first Adam step is lr * sign(g).
        assert!((param[0] - 0.9).abs() < 1e-4);
        assert!((param[1] + 0.9).abs() < 1e-4);
        assert_eq!(param[2], 0.5);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut optimizer = AdamOptimizer::new(0.05);
        let mut param = Array1::from_elem(1, 3.0f32);

        for _ in 0..500 {
            let gradient = &param * 2.0;
            optimizer.begin_step();
            optimizer.step("x", &mut param, &gradient);
        }

        assert!(param[0].abs() < 0.1);
    }
}
