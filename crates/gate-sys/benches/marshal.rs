use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use libc::c_void;

use gate_core::platform::{delete_temp_file, write_temp_file};
use gate_sys::{
    TGATE_MAX_INPUTS, TGATE_MAX_TENSOR_DIMS, TGATE_TENSOR_NAME_MAX_LEN, tgate_dispose_model,
    tgate_dtype_t, tgate_error_t, tgate_forward, tgate_forward_input_t, tgate_free_forward_output,
    tgate_load_model, tgate_shape_t, tgate_status_t, tgate_tensor_t, tgate_validate_tensor,
};

fn tensor_of(dims: &[i64], data: &mut [u8]) -> tgate_tensor_t {
    let mut shape = tgate_shape_t {
        num_dims: dims.len() as i32,
        dims: [0; TGATE_MAX_TENSOR_DIMS],
    };
    shape.dims[..dims.len()].copy_from_slice(dims);
    tgate_tensor_t {
        shape,
        dtype: tgate_dtype_t::F32,
        data: data.as_mut_ptr() as *mut c_void,
        data_size: data.len(),
        name: [0; TGATE_TENSOR_NAME_MAX_LEN],
    }
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary_validate");
    let dims = [1i64, 3, 224, 224];
    let mut data = vec![0u8; 602112];
    let tensor = tensor_of(&dims, &mut data);

    group.bench_function("validate_nchw_f32", |bench| {
        bench.iter(|| {
            let mut error = tgate_error_t::cleared();
            let status = unsafe { tgate_validate_tensor(&tensor, &mut error) };
            assert_eq!(status, tgate_status_t::OK);
        })
    });
    group.finish();
}

fn bench_forward_echo(c: &mut Criterion) {
    let path = write_temp_file(b"bench program").unwrap();
    let c_path = std::ffi::CString::new(path.to_str().unwrap()).unwrap();
    let result = unsafe { tgate_load_model(c_path.as_ptr()) };
    assert_eq!(result.error.code, tgate_status_t::OK);
    let model = result.model;

    let shapes: &[(&[i64], &str)] = &[
        (&[1, 16], "tiny_1x16"),
        (&[1, 3, 224, 224], "nchw_1x3x224x224"),
    ];

    let mut group = c.benchmark_group("boundary_forward_echo");
    for &(dims, name) in shapes {
        let numel: i64 = dims.iter().product();
        let mut data = vec![0u8; numel as usize * 4];
        let tensor = tensor_of(dims, &mut data);
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_function(BenchmarkId::new("forward", name), |bench| {
            bench.iter(|| {
                let mut input = tgate_forward_input_t {
                    num_inputs: 1,
                    inputs: [std::ptr::null(); TGATE_MAX_INPUTS],
                };
                input.inputs[0] = &tensor;
                let mut output = unsafe { tgate_forward(model, &input) };
                assert_eq!(output.error.code, tgate_status_t::OK);
                unsafe { tgate_free_forward_output(&mut output) };
            })
        });
    }
    group.finish();

    unsafe { tgate_dispose_model(model) };
    delete_temp_file(&path).unwrap();
}

criterion_group!(benches, bench_validate, bench_forward_echo);
criterion_main!(benches);
