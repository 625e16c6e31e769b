use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use libc::c_void;

use gate_core::platform::{delete_temp_file, write_temp_file};
use gate_sys::{
    TGATE_MAX_INPUTS, TGATE_MAX_TENSOR_DIMS, TGATE_TENSOR_NAME_MAX_LEN, tgate_dispose_model,
    tgate_dtype_t, tgate_error_t, tgate_forward, tgate_forward_input_t, tgate_free_forward_output,
    tgate_load_model, tgate_shape_t, tgate_status_t, tgate_tensor_t, tgate_version,
};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "tensorGate development CLI")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Drive the whole boundary end to end: load, forward, free, dispose.
    Smoke {
        /// Model file to load; a temp reference program is written if omitted.
        model: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt::try_init();
    let args = Args::parse();
    match args.cmd {
        Cmd::Smoke { model } => smoke(model),
    }
}

fn message_of(error: &tgate_error_t) -> String {
    unsafe { CStr::from_ptr(error.message.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

fn smoke(model: Option<PathBuf>) -> ExitCode {
    let version = unsafe { CStr::from_ptr(tgate_version()) };
    println!("tensorGate {}", version.to_string_lossy());

    let (path, is_temp) = match model {
        Some(path) => (path, false),
        None => {
            let path = match write_temp_file(b"tensorgate reference program") {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("cannot write temp program: {e}");
                    return ExitCode::FAILURE;
                }
            };
            (path, true)
        }
    };

    let c_path = CString::new(path.to_string_lossy().into_owned()).expect("path without NUL");
    let result = unsafe { tgate_load_model(c_path.as_ptr()) };
    if result.error.code != tgate_status_t::OK {
        eprintln!("load failed: {}", message_of(&result.error));
        return ExitCode::FAILURE;
    }
    println!("loaded {}", path.display());

    // A small NCHW-ish f32 input with recognizable content.
    let dims = [1i64, 2, 3];
    let values: Vec<f32> = (0..6).map(|i| i as f32 * 0.5).collect();
    let mut data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut shape = tgate_shape_t {
        num_dims: dims.len() as i32,
        dims: [0; TGATE_MAX_TENSOR_DIMS],
    };
    shape.dims[..dims.len()].copy_from_slice(&dims);
    let tensor = tgate_tensor_t {
        shape,
        dtype: tgate_dtype_t::F32,
        data: data.as_mut_ptr() as *mut c_void,
        data_size: data.len(),
        name: [0; TGATE_TENSOR_NAME_MAX_LEN],
    };
    let mut input = tgate_forward_input_t {
        num_inputs: 1,
        inputs: [std::ptr::null(); TGATE_MAX_INPUTS],
    };
    input.inputs[0] = &tensor;

    let mut output = unsafe { tgate_forward(result.model, &input) };
    if output.error.code != tgate_status_t::OK {
        eprintln!("forward failed: {}", message_of(&output.error));
        unsafe { tgate_dispose_model(result.model) };
        return ExitCode::FAILURE;
    }
    println!("forward produced {} output(s)", output.num_outputs);

    for i in 0..output.num_outputs as usize {
        let out = output.outputs[i];
        if out.is_null() {
            println!("  output {i}: <non-tensor>");
            continue;
        }
        let out = unsafe { &*out };
        let ndim = out.shape.num_dims as usize;
        let echoed: Vec<f32> = unsafe {
            std::slice::from_raw_parts(out.data as *const u8, out.data_size)
        }
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
        println!(
            "  output {i}: dims {:?}, {} bytes, values {:?}",
            &out.shape.dims[..ndim],
            out.data_size,
            echoed
        );
    }

    unsafe { tgate_free_forward_output(&mut output) };
    unsafe { tgate_dispose_model(result.model) };
    if is_temp {
        let _ = delete_temp_file(&path);
    }

    println!("smoke test passed");
    ExitCode::SUCCESS
}
