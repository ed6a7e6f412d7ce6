use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::activations::Activation;
use crate::layers::{DenseLayer, WeightInit, PRE_ACTIVATION_LIMIT, REINIT_SCALE};
use crate::optimizer::{Optimizer, GradientClipper, PARAMETER_LIMIT, SGD, UPDATE_LIMIT};

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn test_dense_layer_shapes() {
    let layer = DenseLayer::new(5, 3, Activation::Relu, &mut rng());
    assert_eq!(layer.weights.shape(), [3, 5]);
    assert_eq!(layer.biases.len(), 3);
    assert_eq!(layer.input_size(), 5);
    assert_eq!(layer.output_size(), 3);
}

#[test]
fn test_xavier_uniform_range_and_zero_bias() {
    let layer = DenseLayer::new(100, 28, Activation::Relu, &mut rng());
    let limit = (6.0f32 / 128.0).sqrt();
    assert!(layer.weights.iter().all(|w| w.abs() <= limit));
    assert!(layer.biases.iter().all(|&b| b == 0.0));
}

#[test]
fn test_forward_computes_affine_then_activation() {
    let layer = DenseLayer::from_parts(
        array![[1.0, -1.0], [0.5, 0.5]],
        array![0.0, -2.0],
        Activation::Relu,
    )
    .unwrap();

    let (pre, out) = layer.forward(array![3.0, 1.0].view());
    assert_eq!(pre, array![2.0, 0.0]);
    assert_eq!(out, array![2.0, 0.0]);
}

#[test]
fn test_pre_activation_clamped() {
    let layer = DenseLayer::from_parts(array![[1000.0, 1000.0]], array![0.0], Activation::Relu).unwrap();
    let pre = layer.pre_activation(array![100.0, 100.0].view());
    assert_eq!(pre[0], PRE_ACTIVATION_LIMIT);
}

#[test]
fn test_pre_activation_skips_non_finite_terms() {
    let layer = DenseLayer::from_parts(array![[f32::NAN, 2.0]], array![f32::INFINITY], Activation::Relu).unwrap();
    let pre = layer.pre_activation(array![1.0, 3.0].view());
    assert_eq!(pre[0], 6.0);
}

#[test]
fn test_from_parts_rejects_mismatched_biases() {
    let result = DenseLayer::from_parts(Array2::zeros((2, 3)), array![0.0], Activation::Relu);
    assert!(result.is_err());
}

#[test]
fn test_backward_relu_blocks_inactive_units() {
    let layer = DenseLayer::from_parts(
        array![[1.0, 0.0], [-1.0, 0.0]],
        array![0.0, 0.0],
        Activation::Relu,
    )
    .unwrap();
    let input = array![2.0, 1.0];
    let (pre, _) = layer.forward(input.view());

    let grads = layer.backward(input.view(), &pre, array![1.0, 1.0].view());
    // Second unit had a negative pre-activation
    assert_eq!(grads.biases, array![1.0, 0.0]);
    assert_eq!(grads.weights, array![[2.0, 1.0], [0.0, 0.0]]);
    assert_eq!(grads.input, array![1.0, 0.0]);
}

#[test]
fn test_sgd_step_is_clipped() {
    let mut sgd = SGD::new();
    let mut weights = array![[0.0, 0.0]];
    sgd.update_weights(&mut weights, &array![[1000.0, -0.5]], 1.0);
    assert_eq!(weights, array![[-UPDATE_LIMIT, 0.5]]);
}

#[test]
fn test_sgd_parameters_clamped() {
    let mut sgd = SGD::new();
    let mut biases = array![PARAMETER_LIMIT - 0.25, -PARAMETER_LIMIT];
    sgd.update_biases(&mut biases, &array![-1.0, 1.0], 1.0);
    assert_eq!(biases, array![PARAMETER_LIMIT, -PARAMETER_LIMIT]);
}

#[test]
fn test_sgd_without_step_clipping() {
    let mut sgd = SGD::new().with_step_clipper(GradientClipper::None);
    let mut biases = array![0.0];
    sgd.update_biases(&mut biases, &array![-5.0], 1.0);
    assert_eq!(biases[0], 5.0);
}

#[test]
fn test_repair_non_finite_parameters() {
    let mut layer = DenseLayer::from_parts(
        array![[f32::NAN, 1.0], [2.0, f32::INFINITY]],
        array![f32::NEG_INFINITY, 0.5],
        Activation::Relu,
    )
    .unwrap();

    let repaired = layer.repair_non_finite(&mut rng());
    assert_eq!(repaired, 3);
    assert!(layer.is_finite());
    assert!(layer.weights[[0, 0]].abs() <= REINIT_SCALE);
    assert!(layer.biases[0].abs() <= REINIT_SCALE);
    assert_eq!(layer.weights[[0, 1]], 1.0);
    assert_eq!(layer.biases[1], 0.5);
}

#[test]
fn test_uniform_init_biases() {
    let init = WeightInit::Uniform { min: -0.1, max: 0.1 };
    let biases = init.initialize_biases(50, &mut rng());
    assert!(biases.iter().all(|b| b.abs() <= 0.1));
    assert_eq!(WeightInit::Zeros.initialize_weights((2, 2), &mut rng()), Array2::<f32>::zeros((2, 2)));
}
