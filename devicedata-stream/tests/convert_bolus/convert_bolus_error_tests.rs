// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error propagation tests for `convert_bolus` operator.

use devicedata_core::{DeviceDataError, Record, StreamItem};
use devicedata_stream::convert_bolus_batch;
use devicedata_stream::prelude::*;
use devicedata_test_utils::records::{basal, diasend_square, dual_normal, dual_square};
use devicedata_test_utils::{
    assert_stream_ended, test_channel_with_errors, unwrap_stream, unwrap_value,
};

#[tokio::test]
async fn test_convert_bolus_propagates_upstream_error() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel_with_errors::<Record>();
    let mut result = Box::pin(stream.convert_bolus(ConvertBolusOptions::default()));

    // Act & Assert
    tx.unbounded_send(StreamItem::Error(DeviceDataError::invalid_record("not an object")))?;
    assert!(matches!(
        unwrap_stream(&mut result, 500).await,
        StreamItem::Error(DeviceDataError::InvalidRecord { .. })
    ));

    tx.unbounded_send(StreamItem::Value(diasend_square(2.0, 1.0)))?;
    let square = unwrap_value(Some(unwrap_stream(&mut result, 500).await));
    assert_eq!(square.get_f64("value"), Some(3.0));

    Ok(())
}

#[tokio::test]
async fn test_convert_bolus_aborts_on_join_key_mismatch() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel_with_errors::<Record>();
    let mut result = Box::pin(stream.convert_bolus(ConvertBolusOptions::default()));

    // Act
    tx.unbounded_send(StreamItem::Value(basal(1)))?;
    tx.unbounded_send(StreamItem::Value(dual_normal("k1", "d1", 2.0)))?;
    tx.unbounded_send(StreamItem::Value(basal(2)))?;
    tx.unbounded_send(StreamItem::Value(dual_square("k2", "d1", 1.0)))?;

    // Assert
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(1)
    );
    assert!(matches!(
        unwrap_stream(&mut result, 500).await,
        StreamItem::Error(DeviceDataError::JoinKeyMismatch { .. })
    ));
    assert_stream_ended(&mut result, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_convert_bolus_batch_returns_no_partial_output() -> anyhow::Result<()> {
    // Arrange
    let input = vec![
        basal(1),
        dual_normal("k1", "d1", 2.0),
        dual_square("k2", "d1", 1.0),
        basal(2),
    ];

    // Act
    let result = convert_bolus_batch(input, &ConvertBolusOptions::default());

    // Assert
    match result {
        Err(DeviceDataError::JoinKeyMismatch {
            normal_join_key,
            square_join_key,
            ..
        }) => {
            assert_eq!(normal_join_key, "k1");
            assert_eq!(square_join_key, "k2");
        }
        other => panic!("expected a join key mismatch, got {other:?}"),
    }

    Ok(())
}
